pub mod amino;
