mod lexer;
mod parser;
mod tree;

#[cfg(test)]
mod tests;

pub use lexer::INTERPOLATION_PLACEHOLDER;
pub use parser::{MAX_NESTING_DEPTH, parse};
pub use tree::{
    Assignment, Braces, ClosureBody, Invocation, InvocationTree, NodeId, ROOT, Shape,
};
