/// Number of words in the runtime stack.
pub const MAX_STACK_HEIGHT: usize = 2048;

/// Number of link words at the base of every activation record
/// (static link, dynamic link, return address).
pub const LINKS_SIZE: i32 = 3;
