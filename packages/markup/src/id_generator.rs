use crate::ast::NodeId;

/// Sequential ID generator for rich-content nodes
///
/// One generator is shared by everything that creates nodes for a document
/// (parsing, typing, splitting blocks) so ids never collide.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    count: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after `last` (e.g. when resuming a session)
    pub fn starting_after(last: NodeId) -> Self {
        Self { count: last.0 }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId(self.count)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.new_id(), NodeId(1));
        assert_eq!(ids.new_id(), NodeId(2));
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_starting_after() {
        let mut ids = IdGenerator::starting_after(NodeId(41));
        assert_eq!(ids.new_id(), NodeId(42));
    }
}
