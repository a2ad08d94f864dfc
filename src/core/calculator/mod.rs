pub mod working;
