mod activation;
mod dense;
