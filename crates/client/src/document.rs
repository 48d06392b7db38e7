// Local document cache.
//
// One opaque snapshot per room, overwritten by whichever write happens
// last, whether a local edit or an inbound sync frame. There is no
// ordering token and no merge: concurrent responders racing to answer
// the same joiner leave it with the last-arriving snapshot.

#[derive(Debug, Clone, Default)]
pub struct DocumentBuffer {
    code: Option<String>,
}

impl DocumentBuffer {
    /// Overwrite the cached snapshot, regardless of origin.
    pub fn set(&mut self, code: impl Into<String>) {
        self.code = Some(code.into());
    }

    /// The latest known snapshot, if any write has happened yet.
    pub fn snapshot(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn clear(&mut self) {
        self.code = None;
    }
}
