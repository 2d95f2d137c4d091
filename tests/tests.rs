mod api;
mod find;
mod quickcheck;
mod scan;
mod split;
mod util;
