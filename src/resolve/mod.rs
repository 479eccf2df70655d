mod store;
mod template;

pub use store::{OptionStore, dependencies_of, direct_dependents, downstream_of};
pub use template::{ResolveError, expand, join_url, placeholders};
