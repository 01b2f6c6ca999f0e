pub mod pool;
pub mod rng;
pub mod storage;
pub mod time;
