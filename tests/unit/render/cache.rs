use super::*;

fn raster() -> Raster {
    Raster::transparent(2, 2)
}

#[test]
fn name_is_namespaced_by_image_id() {
    assert_eq!(FrameCache::new(7, 1, None).name(), "looping.frameCache.7");
}

#[test]
fn get_counts_hits_and_misses() {
    let mut c = FrameCache::new(1, 4, None);
    assert!(c.get("0").is_none());
    assert!(c.insert("0".into(), raster()));
    assert!(c.get("0").is_some());
    let s = c.stats();
    assert_eq!((s.hits, s.misses, s.entries, s.bytes), (1, 1, 1, 16));
}

#[test]
fn capacity_is_frame_count() {
    let mut c = FrameCache::new(1, 2, None);
    assert!(c.insert("0".into(), raster()));
    assert!(c.insert("1".into(), raster()));
    assert!(!c.insert("2".into(), raster()));
    // Replacing an existing key is always allowed.
    assert!(c.insert("1".into(), raster()));
    assert_eq!(c.len(), 2);
}

#[test]
fn byte_budget_refuses_overflowing_inserts() {
    let mut c = FrameCache::new(1, 10, Some(40));
    assert!(c.insert("0".into(), raster()));
    assert!(c.insert("1".into(), raster()));
    assert!(!c.insert("2".into(), raster()));
    assert_eq!(c.stats().bytes, 32);
}

#[test]
fn disabling_clears_and_blocks_inserts() {
    let mut c = FrameCache::new(1, 4, None);
    c.insert("0".into(), raster());
    c.set_enabled(false);
    assert!(c.is_empty());
    assert!(!c.insert("0".into(), raster()));
    assert!(c.get("0").is_none());
    assert_eq!(c.stats().misses, 0);

    c.set_enabled(true);
    assert!(c.insert("0".into(), raster()));
    c.clear();
    assert_eq!(c.stats().bytes, 0);
}
