mod dataloader;

pub use dataloader::DataLoader;
