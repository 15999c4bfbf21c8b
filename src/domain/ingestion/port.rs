use std::io;
use tokio::net::TcpListener;

/// How many consecutive ports are probed before letting the OS pick one.
const PORT_PROBE_LIMIT: u16 = 100;

/// Binds `host:preferred`, moving on to the next port while the current one is taken. After
/// [`PORT_PROBE_LIMIT`] occupied ports an OS-assigned port is used. `preferred == 0` asks the OS
/// directly.
pub async fn bind_available_port(host: &str, preferred: u16) -> io::Result<TcpListener> {
    if preferred == 0 {
        return TcpListener::bind((host, 0)).await;
    }

    for offset in 0..PORT_PROBE_LIMIT {
        let Some(port) = preferred.checked_add(offset) else {
            break;
        };

        match TcpListener::bind((host, port)).await {
            Ok(listener) => {
                if offset > 0 {
                    log::warn!("Port {} is in use, bound next free port {}.", preferred, port);
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => continue,
            Err(e) => return Err(e),
        }
    }

    log::warn!("No free port in {}..{}, falling back to an OS-assigned port.", preferred, preferred.saturating_add(PORT_PROBE_LIMIT));
    TcpListener::bind((host, 0)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_occupied_port() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let listener = bind_available_port("127.0.0.1", taken_port).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), taken_port);
    }

    #[tokio::test]
    async fn zero_means_os_assigned() {
        let listener = bind_available_port("127.0.0.1", 0).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
