use std::fmt::{Display, Formatter};

/// A sub-scope of a storage backend.
///
/// A namespace is a path of byte segments. The empty path is the root
/// namespace. The driver treats namespaces as opaque tokens; each adapter
/// decides what a path means for its engine:
///
/// - the redb adapter maps every path to its own table (a bucket path),
/// - the fjall adapter encodes the path as a key prefix in one flat keyspace,
/// - the in-memory store selects its own ordered map per path.
///
/// # Examples
///
/// ```rust
/// use kvbench::namespace::Namespace;
///
/// let bucket = Namespace::named(b"TestBucket");
/// let nested = bucket.nested(b"NestedBucket");
/// assert_eq!(nested.depth(), 2);
/// assert_eq!(nested.parent(), Some(bucket));
/// assert!(Namespace::root().is_root());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Namespace {
    segments: Vec<Vec<u8>>,
}

impl Namespace {
    /// The root namespace, spanning the backend's default scope.
    pub fn root() -> Namespace {
        Namespace::default()
    }

    /// A top-level namespace. An empty name is the root namespace.
    pub fn named(name: &[u8]) -> Namespace {
        Namespace::root().nested(name)
    }

    /// A child namespace of `self`. An empty child name returns `self`.
    pub fn nested(&self, child: &[u8]) -> Namespace {
        let mut segments = self.segments.clone();
        if !child.is_empty() {
            segments.push(child.to_vec());
        }
        Namespace { segments }
    }

    pub fn parent(&self) -> Option<Namespace> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Namespace { segments })
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", String::from_utf8_lossy(segment))?;
        }
        Ok(())
    }
}
