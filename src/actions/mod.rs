/// Build action implementation.
pub mod build;
/// Clean action implementation.
pub mod clean;
/// Distribution creation action implementation.
pub mod dist;
/// Information display action implementation.
pub mod info;
/// Installation action implementation.
pub mod install;
/// Test action implementation.
pub mod test;
