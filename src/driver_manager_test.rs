#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_command_exists() {
        #[cfg(unix)]
        {
            assert!(DriverManager::command_exists("ls"));
            assert!(!DriverManager::command_exists("nonexistent_command_12345"));
        }

        #[cfg(windows)]
        {
            assert!(DriverManager::command_exists("cmd"));
            assert!(!DriverManager::command_exists("nonexistent_command_12345"));
        }
    }

    #[test]
    fn test_find_free_port() {
        let port = DriverManager::find_free_port(BrowserKind::Chrome).unwrap();
        assert!(port > 0);
        assert!(!DriverManager::is_port_in_use(port));
    }

    #[test]
    fn test_is_port_in_use() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(DriverManager::is_port_in_use(port));
    }

    #[tokio::test]
    async fn test_nothing_listening_is_not_running() {
        assert!(!DriverManager::is_driver_running("http://localhost:65432").await);
        assert!(!DriverManager::is_driver_ready("http://localhost:65432").await);
    }

    #[test]
    fn test_stop_all_empty() {
        let manager = DriverManager::new();
        manager.stop_all();
        manager.kill_driver(BrowserKind::Firefox);
        assert_eq!(manager.managed_count(), 0);
    }
}
