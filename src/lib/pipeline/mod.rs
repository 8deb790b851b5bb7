pub mod hexbin;
