//! Intended-destination tracking consulted around the login redirect.
//!
//! Before a user is sent to the authorization endpoint, the URL they were
//! originally trying to reach is recorded here; the web layer reads it back
//! after a successful login to finish the round trip. The contract is
//! deliberately tiny so hosting frameworks can back it with their own
//! session machinery.

// self
use crate::_prelude::*;

/// Boxed future returned by [`DestinationStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Session-equivalent storage for the pre-login destination.
pub trait DestinationStore
where
	Self: Send + Sync,
{
	/// Records the URL the user intended to reach before login.
	fn put_intended(&self, destination: Url) -> StoreFuture<'_, ()>;

	/// Takes the recorded destination, clearing it.
	fn take_intended(&self) -> StoreFuture<'_, Option<Url>>;
}

/// Error type produced by [`DestinationStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the session engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Thread-safe in-process store for tests and demos.
///
/// Holds a single slot, which matches its per-session usage: production
/// deployments provide one store per user session.
#[derive(Clone, Debug, Default)]
pub struct MemoryDestinationStore(Arc<RwLock<Option<Url>>>);
impl DestinationStore for MemoryDestinationStore {
	fn put_intended(&self, destination: Url) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(destination);

			Ok(())
		})
	}

	fn take_intended(&self) -> StoreFuture<'_, Option<Url>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.write().take()) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn put_then_take_round_trips_and_clears() {
		let store = MemoryDestinationStore::default();
		let destination = Url::parse("https://app.example.com/reports/42")
			.expect("Destination fixture should parse successfully.");

		store
			.put_intended(destination.clone())
			.await
			.expect("Recording a destination should succeed.");

		assert_eq!(
			store.take_intended().await.expect("Taking a destination should succeed."),
			Some(destination),
		);
		assert_eq!(
			store.take_intended().await.expect("Taking a destination should succeed."),
			None,
		);
	}
}
