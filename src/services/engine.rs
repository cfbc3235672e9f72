use crate::error::EngineError;
use crate::models::BlurConfig;
use crate::rendering::{
    depth_map, diffusion, AccelerationCache, DepthMap, DepthSource, DiffusionTable,
    NoAcceleration, PixelImage, RenderOptions, Renderer, ShineMap, Update,
};

/// What an [`BlurEngine::update`] call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineUpdate {
    pub diffusion: Update,
    pub depth_map: Update,
}

/// Owns the diffusion table and depth map for one blur session and keeps
/// them in step with the configuration.
pub struct BlurEngine {
    diffusion: Option<DiffusionTable>,
    depth_map: Option<DepthMap>,
    cache: Box<dyn AccelerationCache>,
}

impl BlurEngine {
    pub fn new() -> Self {
        Self::with_cache(Box::new(NoAcceleration))
    }

    /// Engine that notifies `cache` whenever it replaces state.
    pub fn with_cache(cache: Box<dyn AccelerationCache>) -> Self {
        Self {
            diffusion: None,
            depth_map: None,
            cache,
        }
    }

    /// Reconcile the engine with `config`.
    ///
    /// If the depth map cannot be built the engine is left without one and
    /// the error is returned; the diffusion table is still updated.
    pub fn update(
        &mut self,
        config: &BlurConfig,
        depth_source: Option<&dyn DepthSource>,
    ) -> Result<EngineUpdate, EngineError> {
        config.validate()?;

        let diffusion = diffusion::update(
            &mut self.diffusion,
            Some(&mut *self.cache),
            &config.diffusion_params(),
        );

        let depth_map = depth_map::update(
            &mut self.depth_map,
            Some(&mut *self.cache),
            &config.depth_map_params(),
            depth_source,
        )
        .inspect_err(|e| tracing::warn!(%e, "Depth map unusable"))?;

        tracing::debug!(?diffusion, ?depth_map, "Engine updated");
        Ok(EngineUpdate {
            diffusion,
            depth_map,
        })
    }

    pub fn diffusion(&self) -> Option<&DiffusionTable> {
        self.diffusion.as_ref()
    }

    pub fn diffusion_mut(&mut self) -> Option<&mut DiffusionTable> {
        self.diffusion.as_mut()
    }

    pub fn depth_map(&self) -> Option<&DepthMap> {
        self.depth_map.as_ref()
    }

    /// Build every kernel level now.
    pub fn prepare_all(&mut self) {
        if let Some(table) = self.diffusion.as_mut() {
            table.prepare_all();
        }
    }

    /// Drop both the table and the map.
    pub fn reset(&mut self) {
        diffusion::destroy(&mut self.diffusion);
        depth_map::destroy(&mut self.depth_map);
    }

    /// Blur `image` with the current state.
    ///
    /// Returns `None` before the first successful [`update`](Self::update).
    pub fn render(&mut self, image: &PixelImage, config: &BlurConfig) -> Option<PixelImage> {
        let table = self.diffusion.as_mut()?;

        let depth_map = if config.enable_depth_map {
            self.depth_map.as_ref()
        } else {
            None
        };

        let shine = config.shine_enabled().then(|| {
            ShineMap::from_image(
                image,
                config.shine_type,
                config.shine_threshold,
                config.shine_level,
            )
        });

        let options = RenderOptions {
            precedence: config.enable_depth_precedence,
            fill_behind: config.enable_depth_fill_behind,
            fuzzy: config.enable_depth_fuzzy,
        };

        let output = Renderer::new(image, table)
            .depth_map(depth_map)
            .shine(shine.as_ref())
            .options(options)
            .render();

        tracing::info!(
            width = output.width(),
            height = output.height(),
            cached_levels = table.cached_levels(),
            "Rendered image"
        );
        Some(output)
    }
}

impl Default for BlurEngine {
    fn default() -> Self {
        Self::new()
    }
}
