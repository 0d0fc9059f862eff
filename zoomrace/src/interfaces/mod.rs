pub mod presenter_interface;
