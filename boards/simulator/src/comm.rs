use std::io::Read;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use log::{info, warn, error};

/// Longest command line accepted, longer ones are dropped
const MAX_LINE_LEN: usize = 64;

/// Command link over TCP, in place of BLE
///
/// Commands are newline-terminated; each complete line is handed to `on_write`, from the
/// link thread, the way BLE writes are delivered from the BT task.
pub struct CommandLink;

impl CommandLink {
    pub fn run<F>(name: &str, on_write: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        // Get server address from environment variable or use default
        let server_addr = std::env::var("KEYBOT_SERVER")
            .unwrap_or_else(|_| "127.0.0.1:7113".to_string());
        let name = name.to_string();

        thread::spawn(move || {
            info!("Starting command link for '{}'", name);
            info!("Command server address: {}", server_addr);

            loop {
                match TcpStream::connect(&server_addr) {
                    Ok(mut stream) => {
                        info!("Connected to command server at {}", server_addr);
                        let mut buffer = [0u8; 256];
                        let mut pending = Vec::new();

                        loop {
                            match stream.read(&mut buffer) {
                                Ok(0) => {
                                    warn!("Command server closed connection");
                                    break;
                                }
                                Ok(n) => {
                                    pending.extend_from_slice(&buffer[..n]);
                                    for line in take_lines(&mut pending) {
                                        on_write(&line);
                                    }
                                }
                                Err(e) => {
                                    error!("Failed to read from command server: {:?}", e);
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Failed to connect to command server at {}: {:?}", server_addr, e);
                    }
                }

                // Wait before reconnecting
                thread::sleep(Duration::from_secs(2));
                info!("Attempting to reconnect to command server...");
            }
        });
    }
}

/// Extract complete lines from `pending`, without their terminator
///
/// Lines longer than [MAX_LINE_LEN] are dropped, including an unterminated tail.
fn take_lines(pending: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let mut line: Vec<u8> = pending.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.len() > MAX_LINE_LEN {
            warn!("Command line too long ({} bytes), dropped", line.len());
        } else if !line.is_empty() {
            lines.push(line);
        }
    }
    if pending.len() > MAX_LINE_LEN {
        warn!("No line terminator after {} bytes, data dropped", pending.len());
        pending.clear();
    }
    lines
}
