pub mod fixture;
pub mod perigon;
