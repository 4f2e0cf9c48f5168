use manifest_sync::{ArchiveSource, FetchConfig, FetchError, HttpFetcher};
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;

/// Serve one connection on a local port, returning the base URL and a
/// handle yielding the request line.
fn serve_once(response: Vec<u8>, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        thread::sleep(delay);
        let _ = stream.write_all(&response);
        let _ = stream.flush();
        request.lines().next().unwrap_or_default().to_string()
    });
    (base, handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

fn ok_response(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn fetcher(timeout: Duration) -> HttpFetcher {
    HttpFetcher::new(FetchConfig::default().with_timeout(timeout)).unwrap()
}

#[test]
fn downloads_body_to_destination() {
    let body: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    let (base, server) = serve_once(ok_response(&body), Duration::ZERO);
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("downloaded_1234.zip");

    let url = format!("{}/Fairyvmos/BlankTMing/archive/refs/heads/1234.zip", base);
    let written = fetcher(Duration::from_secs(10)).fetch(&url, &dest).unwrap();

    assert_eq!(written, body.len() as u64);
    assert_eq!(fs::read(&dest).unwrap(), body);
    assert_eq!(
        server.join().unwrap(),
        "GET /Fairyvmos/BlankTMing/archive/refs/heads/1234.zip HTTP/1.1"
    );
}

#[test]
fn not_found_is_http_error() {
    let response = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec();
    let (base, server) = serve_once(response, Duration::ZERO);
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("downloaded_1.zip");

    let url = format!("{}/owner/repo/archive/refs/heads/1.zip", base);
    let err = fetcher(Duration::from_secs(10)).fetch(&url, &dest).unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, FetchError::Http { status: 404, ref url } if url.ends_with("1.zip")));
    assert!(!dest.exists());
    server.join().unwrap();
}

#[test]
fn slow_server_times_out() {
    let (base, _server) = serve_once(ok_response(b"late"), Duration::from_secs(5));
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("downloaded_2.zip");

    let url = format!("{}/owner/repo/archive/refs/heads/2.zip", base);
    let err = fetcher(Duration::from_millis(300))
        .fetch(&url, &dest)
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout), "got {:?}", err);
}

#[test]
fn refused_connection_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let temp = TempDir::new().unwrap();
    let url = format!("http://{}/owner/repo/archive/refs/heads/3.zip", addr);
    let err = fetcher(Duration::from_secs(5))
        .fetch(&url, &temp.path().join("downloaded_3.zip"))
        .unwrap_err();

    assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
}
