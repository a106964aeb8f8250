use std::fmt;
use std::io;

/// Resolves an external entity to its text, given its public and system id.
pub type EntityResolver = dyn Fn(Option<&str>, &str) -> io::Result<String>;

/// Caller supplied context for a single parse.
///
/// Without a resolver, external DTD subsets are skipped (or, when
/// validating, rejected) and external entities cannot be referenced.
#[derive(Default)]
pub struct ReadContext {
    entity_resolver: Option<Box<EntityResolver>>,
}

impl ReadContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that resolves external entities through `resolver`.
    ///
    /// ```rust
    /// use nmxml::ReadContext;
    ///
    /// let context = ReadContext::with_entity_resolver(|_public_id, system_id| {
    ///     Ok(format!("<!-- {} -->", system_id))
    /// });
    /// ```
    pub fn with_entity_resolver<F>(resolver: F) -> Self
    where
        F: Fn(Option<&str>, &str) -> io::Result<String> + 'static,
    {
        ReadContext {
            entity_resolver: Some(Box::new(resolver)),
        }
    }

    pub(crate) fn resolve(&self, public_id: Option<&str>, system_id: &str) -> Option<io::Result<String>> {
        self.entity_resolver
            .as_ref()
            .map(|resolver| resolver(public_id, system_id))
    }
}

impl fmt::Debug for ReadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadContext")
            .field("entity_resolver", &self.entity_resolver.is_some())
            .finish()
    }
}
