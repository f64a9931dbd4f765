use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::warn;

/// Run `operation` up to `attempts` times, sleeping `delay` between tries.
///
/// The error of the final attempt is returned unchanged. Service
/// supervision calls occasionally fail right after a link swap while the
/// old process is still releasing its port; a couple of spaced attempts is
/// enough, and the bound keeps a genuinely broken install from looping.
pub async fn with_retry<T, E, F, Fut>(
    attempts: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut remaining = attempts.max(1);

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(error);
                }
                warn!("Attempt failed ({remaining} left), retrying in {delay:?}: {error}");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
