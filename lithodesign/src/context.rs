//! The global context for layout generation.

use std::any::TypeId;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gdsconv::export::{export_gds, GdsExportOpts};
use gdsconv::GdsLayer;
use layir::Library;
use once_cell::sync::OnceCell;
use tracing::{span, Level};

use crate::block::Block;
use crate::error::Result;
use crate::layout::{conv, Component};
use crate::pdk::Pdk;

type CacheKey = (TypeId, Vec<u8>);
type CacheCell = Arc<OnceCell<Result<Arc<Component>>>>;

/// The context in which components are generated.
///
/// Carries the PDK and a cache of generated components. Cloning a context is
/// cheap; clones share the same cache.
#[derive(Debug, Clone)]
pub struct Context {
    pdk: Arc<Pdk>,
    cache: Arc<Mutex<HashMap<CacheKey, CacheCell>>>,
}

impl Context {
    /// Creates a new context using the given PDK.
    pub fn new(pdk: Pdk) -> Self {
        Self {
            pdk: Arc::new(pdk),
            cache: Default::default(),
        }
    }

    /// Creates a context using [`Pdk::demo`].
    pub fn demo() -> Self {
        Self::new(Pdk::demo())
    }

    /// The PDK of this context.
    #[inline]
    pub fn pdk(&self) -> &Pdk {
        &self.pdk
    }

    /// Generates the layout of `block`.
    ///
    /// Blocks of the same type with the same serialized parameters are
    /// generated once, even when requested from several threads at the same
    /// time; later calls return the cached component, or the cached error if
    /// generation failed.
    pub fn generate_layout<B: Block>(&self, block: &B) -> Result<Arc<Component>> {
        let key = (TypeId::of::<B>(), flexbuffers::to_vec(block)?);
        // The map lock is released before generating, since generators
        // may generate their own subcomponents.
        let cell = self.lock_cache().entry(key).or_default().clone();
        if let Some(cached) = cell.get() {
            tracing::trace!(block = %block.name(), "layout cache hit");
            return cached.clone();
        }

        cell.get_or_init(|| {
            let span = span!(Level::INFO, "generating layout", block = %block.name());
            let _guard = span.enter();

            let generated = block.layout(self).map(|mut component| {
                component.set_name(block.name());
                Arc::new(component)
            });
            if let Err(err) = &generated {
                tracing::warn!(%err, "layout generation failed");
            }
            generated
        })
        .clone()
    }

    /// Generates `block` and lowers it to a layout library.
    pub fn export_library<B: Block>(&self, block: &B) -> Result<Library<GdsLayer>> {
        let component = self.generate_layout(block)?;
        conv::to_library(&component)
    }

    /// Generates `block` and writes it to a GDS file at `path`.
    ///
    /// Parent directories of `path` are created if needed.
    pub fn write_gds<B: Block>(&self, block: &B, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let lib = self.export_library(block)?;
        let gds = export_gds(
            &lib,
            GdsExportOpts {
                name: block.name(),
                ..Default::default()
            },
        )?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        gds.save(path)?;
        tracing::info!(path = %path.display(), cells = lib.num_cells(), "wrote GDS");
        Ok(())
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheCell>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    use arcstr::ArcStr;
    use geometry::prelude::Rect;
    use serde::Serialize;
    use test_log::test;

    use super::*;
    use crate::error::{ensure_positive, Error};
    use crate::pdk::layers::demo::AU;

    #[derive(Serialize)]
    struct Counted {
        width: f64,
        #[serde(skip)]
        calls: &'static AtomicUsize,
    }

    impl Block for Counted {
        fn id() -> ArcStr {
            arcstr::literal!("counted")
        }

        fn name(&self) -> ArcStr {
            arcstr::format!("counted_{}", self.width)
        }

        fn layout(&self, _ctx: &Context) -> Result<Component> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ensure_positive("counted", "width", self.width)?;
            let mut c = Component::new("counted");
            c.add_rect(AU, Rect::from_size(self.width, 1.));
            Ok(c)
        }
    }

    #[derive(Serialize)]
    struct Slow {
        #[serde(skip)]
        calls: &'static AtomicUsize,
    }

    impl Block for Slow {
        fn id() -> ArcStr {
            arcstr::literal!("slow")
        }

        fn layout(&self, _ctx: &Context) -> Result<Component> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            let mut c = Component::new("slow");
            c.add_rect(AU, Rect::from_size(1., 1.));
            Ok(c)
        }
    }

    #[derive(Serialize)]
    struct MaybeWide {
        width: Option<f64>,
    }

    impl Block for MaybeWide {
        fn id() -> ArcStr {
            arcstr::literal!("maybe_wide")
        }

        fn layout(&self, _ctx: &Context) -> Result<Component> {
            let width = self.width.unwrap_or(1.);
            ensure_positive("maybe_wide", "width", width)?;
            let mut c = Component::new("maybe_wide");
            c.add_rect(AU, Rect::from_size(width, 1.));
            Ok(c)
        }
    }

    #[derive(Serialize)]
    struct Parent;

    static PARENT_CHILD_CALLS: AtomicUsize = AtomicUsize::new(0);

    impl Block for Parent {
        fn id() -> ArcStr {
            arcstr::literal!("parent")
        }

        fn layout(&self, ctx: &Context) -> Result<Component> {
            let child = ctx.generate_layout(&Counted {
                width: 7.,
                calls: &PARENT_CHILD_CALLS,
            })?;
            let mut c = Component::new("parent");
            c.add_ref(crate::layout::Instance::new(child));
            Ok(c)
        }
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn context_and_errors_cross_threads() {
        assert_send_sync::<Context>();
        assert_send_sync::<Error>();
        assert_send_sync::<Result<Arc<Component>>>();
    }

    #[test]
    fn identical_parameters_share_one_component() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let ctx = Context::demo();
        let a = ctx
            .generate_layout(&Counted {
                width: 3.,
                calls: &CALLS,
            })
            .unwrap();
        let b = ctx
            .generate_layout(&Counted {
                width: 3.,
                calls: &CALLS,
            })
            .unwrap();
        let c = ctx
            .generate_layout(&Counted {
                width: 4.,
                calls: &CALLS,
            })
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a.name(), "counted_3");
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_requests_generate_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let ctx = Context::demo();
        let barrier = &Barrier::new(8);
        let ctx = &ctx;
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(move || {
                        barrier.wait();
                        ctx.generate_layout(&Slow { calls: &CALLS }).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|c| Arc::ptr_eq(c, &results[0])));
    }

    #[test]
    fn errors_are_cached_and_returned() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let ctx = Context::demo();
        let bad = Counted {
            width: -1.,
            calls: &CALLS,
        };
        let err = ctx.generate_layout(&bad).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { param: "width", .. }));
        assert!(ctx.generate_layout(&bad).is_err());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_finite_parameters_do_not_alias_missing_ones() {
        let ctx = Context::demo();
        let err = ctx
            .generate_layout(&MaybeWide {
                width: Some(f64::NAN),
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { param: "width", .. }));
        assert!(ctx.generate_layout(&MaybeWide { width: None }).is_ok());

        let ctx = Context::demo();
        assert!(ctx.generate_layout(&MaybeWide { width: None }).is_ok());
        assert!(ctx
            .generate_layout(&MaybeWide {
                width: Some(f64::INFINITY),
            })
            .is_err());
    }

    #[test]
    fn nested_generation_does_not_deadlock() {
        let ctx = Context::demo();
        let parent = ctx.generate_layout(&Parent).unwrap();
        let child = ctx
            .generate_layout(&Counted {
                width: 7.,
                calls: &PARENT_CHILD_CALLS,
            })
            .unwrap();
        assert!(Arc::ptr_eq(parent.instances().next().unwrap().cell(), &child));
        let lib = ctx.export_library(&Parent).unwrap();
        assert_eq!(lib.num_cells(), 2);
    }

    #[test]
    fn write_gds_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.gds");
        Context::demo().write_gds(&Parent, &path).unwrap();
        let gds = gds21::GdsLibrary::load(&path).unwrap();
        assert_eq!(gds.structs.len(), 2);
    }
}
