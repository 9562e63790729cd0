pub mod bitpack;
