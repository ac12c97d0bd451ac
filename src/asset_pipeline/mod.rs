pub mod tangents;
