// The census pipeline stages, in data-flow order: sampling turns an image
// into flat color samples, scaling whitens them, clustering finds the k
// dominant points, recovery maps centroids back to RGB, and hex handles the
// spellings used at the naming boundary.

pub mod clustering;
pub mod hex;
pub mod recovery;
pub mod sampling;
pub mod scaling;
