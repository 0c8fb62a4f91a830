//! Configuration shared by the tree builder, query compiler and evaluator

use tracing::Dispatch;

/// Parse and query options
#[derive(Debug, Clone)]
pub struct Options {
    /// Encoding label written in the XML declaration by serialization.
    /// A parsed `encoding="..."` declaration overrides it.
    pub encoding: String,
    /// Drop text events made only of spaces, tabs and line breaks
    pub drop_formatting_whitespace: bool,
    /// Subscriber that receives this library's trace events. `None` logs to
    /// whatever subscriber is installed for the current thread, which is a
    /// no-op unless the caller set one up.
    pub dispatch: Option<Dispatch>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            encoding: "utf-8".to_string(),
            drop_formatting_whitespace: true,
            dispatch: None,
        }
    }
}

impl Options {
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn drop_formatting_whitespace(mut self, drop: bool) -> Self {
        self.drop_formatting_whitespace = drop;
        self
    }

    /// Route trace events to `dispatch`
    pub fn dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = Some(dispatch.into());
        self
    }

    /// Run `f` with this configuration's subscriber as the default
    pub(crate) fn observe<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}
