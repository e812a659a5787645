//! This module defines traits for external collaborators (the platform API, the local git
//! repository, the file system and the clock) so commands can be tested against mocks.
pub mod clock;
pub mod fs;
pub mod git;
pub mod qovery;

pub use clock::*;
pub use fs::*;
pub use git::*;
pub use qovery::*;
