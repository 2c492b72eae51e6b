use tokio::net::TcpListener;

/// Serves the echo routes on `127.0.0.1:$PORT` (default 4000) for manual
/// poking with a real transport.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "4000".to_string());
    let listener = TcpListener::bind(("127.0.0.1", port.parse::<u16>().unwrap_or(4000))).await?;
    println!(
        "mock server on http://{} (/anything, /json, /status/{{code}}, /stream/{{count}}, /redirect)",
        listener.local_addr()?
    );
    mock_server::run(listener).await
}
