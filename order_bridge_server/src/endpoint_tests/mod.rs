mod helpers;
mod orders;
mod sessions;
