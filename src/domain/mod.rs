mod cost;
mod money;
mod month;
mod subscription;

pub use cost::*;
pub use money::*;
pub use month::*;
pub use subscription::*;
