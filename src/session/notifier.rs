//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use async_trait::async_trait;

// Write-only channel to whatever external helper processes watch session
// state (e.g. route-map scripts). Best-effort: a failure here raises
// `Failure` for the session but never blocks it and never produces a
// NOTIFICATION.
#[async_trait]
pub trait HelperProcessNotifier: Send {
    async fn notify(&mut self, peer_addr: IpAddr) -> std::io::Result<Vec<String>>;
    async fn write(&mut self, name: &str, message: &str) -> std::io::Result<()>;
}

#[cfg(any(test, feature = "testing"))]
pub mod test {
    use super::*;

    // No-op notifier: no helper processes registered, every `notify` call
    // returns an empty list so the engine never attempts a `write`.
    pub struct NullNotifier;

    #[async_trait]
    impl HelperProcessNotifier for NullNotifier {
        async fn notify(
            &mut self,
            _peer_addr: IpAddr,
        ) -> std::io::Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn write(
            &mut self,
            _name: &str,
            _message: &str,
        ) -> std::io::Result<()> {
            Ok(())
        }
    }
}
