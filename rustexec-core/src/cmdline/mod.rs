//! Command line model
//!
//! A [`CmdLine`] is an ordered list of typed [`CmdLineArgument`]s that renders
//! itself for a target [`OperatingSystemFamily`], either for execution or as a
//! transcript with secrets masked. The rendered string is the only thing sent
//! to the remote side, so escaping correctness lives here.

mod argument;
mod line;
mod os;

pub use argument::{ArgumentKind, CmdLineArgument, EMPTY_ARGUMENT, SECRET_MASK, SPECIAL_CHARS};
pub use line::CmdLine;
pub use os::OperatingSystemFamily;
