pub mod centroid_tracker;
