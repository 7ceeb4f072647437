pub mod import_components;
