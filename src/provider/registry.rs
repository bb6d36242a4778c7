//! Registration of provider instances with a hosting framework's registry.

// std
use std::collections::HashMap;
// self
use crate::{_prelude::*, http::HttpTransport, provider::B2cProvider};

/// Identifier hosting frameworks register this provider under.
pub const IDENTIFIER: &str = "azuread_b2c";

/// Maps provider identifiers to shared provider instances.
///
/// Pure registration: construction and wiring happen elsewhere, the registry
/// only hands out what was put in.
pub struct ProviderRegistry<C>
where
	C: HttpTransport,
{
	providers: RwLock<HashMap<String, Arc<B2cProvider<C>>>>,
}
impl<C> ProviderRegistry<C>
where
	C: HttpTransport,
{
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self { providers: RwLock::new(HashMap::new()) }
	}

	/// Registers a provider under [`IDENTIFIER`].
	pub fn register_azuread_b2c(&self, provider: Arc<B2cProvider<C>>) {
		self.register(IDENTIFIER, provider);
	}

	/// Registers a provider under an arbitrary identifier, replacing any
	/// previous registration.
	pub fn register(&self, name: impl Into<String>, provider: Arc<B2cProvider<C>>) {
		self.providers.write().insert(name.into(), provider);
	}

	/// Looks up a registered provider.
	pub fn get(&self, name: &str) -> Option<Arc<B2cProvider<C>>> {
		self.providers.read().get(name).cloned()
	}
}
impl<C> Default for ProviderRegistry<C>
where
	C: HttpTransport,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<C> Debug for ProviderRegistry<C>
where
	C: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistry")
			.field("registered", &self.providers.read().len())
			.finish()
	}
}
