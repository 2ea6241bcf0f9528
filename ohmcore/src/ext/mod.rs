pub mod ohmlog;
