pub mod background_pass;
pub mod pass;
pub mod pbr_pass;
