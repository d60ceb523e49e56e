mod latent;
mod network;
mod sampler;
