mod remote_image;

pub use remote_image::{MAX_IMAGE_HEIGHT, RemoteImage, ShellUpdate};
