//! Limiter slot held for the duration of one login attempt

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::errors::AuthResult;

use super::identity::mask_identity;
use super::limiter::{AttemptStatus, LoginRateLimiter};

/// A slot reserved by [`LoginRateLimiter::check_login_attempt`]
///
/// The attempt settles the slot by recording a failure, resetting the
/// counter or releasing it. A reservation dropped unsettled, for example
/// when the login future is cancelled mid-flight, gives its slot back from
/// a spawned task.
pub struct AttemptReservation<L>
where
    L: LoginRateLimiter + 'static,
{
    limiter: Arc<L>,
    identity: String,
    settled: bool,
}

impl<L> AttemptReservation<L>
where
    L: LoginRateLimiter + 'static,
{
    /// Check the limiter and hold the reserved slot
    ///
    /// # Returns
    /// * `Ok(reservation)` - Attempt admitted
    /// * `Err(AuthError::TooManyAttempts)` - Identity is locked or saturated
    /// * `Err(AuthError::StorageUnavailable)` - Counter backend failed
    pub async fn acquire(limiter: Arc<L>, identity: &str) -> AuthResult<Self> {
        limiter.check_login_attempt(identity).await?;
        Ok(Self {
            limiter,
            identity: identity.to_string(),
            settled: false,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Count the attempt as a failure
    pub async fn record_failure(mut self) -> AuthResult<AttemptStatus> {
        let status = self.limiter.record_failed_attempt(&self.identity).await?;
        self.settled = true;
        Ok(status)
    }

    /// Clear the identity's failures after a successful login
    pub async fn reset(mut self) -> AuthResult<()> {
        self.limiter.reset_attempts(&self.identity).await?;
        self.settled = true;
        Ok(())
    }

    /// Give the slot back for an attempt that reached no verdict
    pub async fn release(mut self) {
        if let Err(e) = self.limiter.release_attempt(&self.identity).await {
            warn!(error = %e, identity = %mask_identity(&self.identity), "Failed to release login attempt");
        }
        self.settled = true;
    }
}

impl<L> Drop for AttemptReservation<L>
where
    L: LoginRateLimiter + 'static,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let identity = std::mem::take(&mut self.identity);
        let Ok(handle) = Handle::try_current() else {
            warn!(identity = %mask_identity(&identity), "Login attempt abandoned outside a runtime, slot not released");
            return;
        };

        debug!(identity = %mask_identity(&identity), "Releasing slot of an abandoned login attempt");
        let limiter = Arc::clone(&self.limiter);
        handle.spawn(async move {
            if let Err(e) = limiter.release_attempt(&identity).await {
                warn!(error = %e, identity = %mask_identity(&identity), "Failed to release login attempt");
            }
        });
    }
}
