pub mod hyper_ext;
