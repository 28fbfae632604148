use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::{ScenographError, ScenographResult};
use crate::scene::graph::{NodeId, Scene};
use crate::scene::shapes::Outline;

/// One glyph outline produced by a markup collaborator: an absolute anchor
/// plus an anchor-relative vector path.
#[derive(Clone, Debug)]
pub struct Glyph {
    pub anchor: Point,
    pub path: BezPath,
}

/// The full outline set for one markup expression.
#[derive(Clone, Debug, Default)]
pub struct GlyphSheet {
    pub glyphs: Vec<Glyph>,
}

/// Text-to-vector-path collaborator.
///
/// The engine places no constraint on how the geometry was produced; it
/// only consumes the resulting outlines. A non-success status is surfaced
/// as a pipeline failure: fatal for the entity being authored, non-fatal
/// for the process.
pub trait MarkupSource {
    /// Produce glyph outlines for a markup expression.
    fn outline(&mut self, expression: &str) -> ScenographResult<GlyphSheet>;
}

impl Scene {
    /// Build a sequenced block of leaf curves from collaborator-produced
    /// markup geometry.
    ///
    /// Unlike ordinary block insertion, imported glyphs share one time
    /// window instead of chaining, so composite reveals spread across the
    /// glyph run the way text expects.
    pub fn import_markup(
        &mut self,
        source: &mut dyn MarkupSource,
        label: &str,
        expression: &str,
    ) -> ScenographResult<NodeId> {
        let sheet = source.outline(expression).map_err(|e| {
            tracing::warn!(label, error = %e, "markup collaborator failed; entity not created");
            match e {
                p @ ScenographError::Pipeline(_) => p,
                other => {
                    ScenographError::pipeline(format!("markup source failed for '{label}': {other}"))
                }
            }
        })?;
        if sheet.glyphs.is_empty() {
            let msg = format!("markup source produced no glyphs for '{label}'");
            tracing::warn!("{msg}");
            return Err(ScenographError::pipeline(msg));
        }

        let block = self.add_block(label);
        for (i, glyph) in sheet.glyphs.into_iter().enumerate() {
            let id = self.add_curve(
                format!("{label}/g{i}"),
                Outline::new(glyph.anchor, glyph.path),
            );
            self.link_child(block, id);
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Epoch;

    struct Stub {
        glyphs: usize,
    }

    impl MarkupSource for Stub {
        fn outline(&mut self, _expression: &str) -> ScenographResult<GlyphSheet> {
            if self.glyphs == 0 {
                return Err(ScenographError::pipeline("renderer exited with status 1"));
            }
            let glyphs = (0..self.glyphs)
                .map(|i| {
                    let mut path = BezPath::new();
                    path.move_to(Point::ORIGIN);
                    path.line_to(Point::new(8.0, 0.0));
                    path.line_to(Point::new(8.0, 12.0));
                    path.close_path();
                    Glyph {
                        anchor: Point::new(10.0 * i as f64, 0.0),
                        path,
                    }
                })
                .collect();
            Ok(GlyphSheet { glyphs })
        }
    }

    #[test]
    fn import_builds_a_block_with_shared_windows() {
        let mut scene = Scene::new();
        let block = scene
            .import_markup(&mut Stub { glyphs: 3 }, "title", "hello")
            .unwrap();
        let children = scene.children(block).to_vec();
        assert_eq!(children.len(), 3);
        // Glyphs share one window instead of chaining.
        for &ch in &children {
            assert_eq!(scene.epoch(ch), Epoch::default());
        }
        assert_eq!(scene.epoch(block), Epoch::default());
    }

    #[test]
    fn collaborator_failure_creates_nothing() {
        let mut scene = Scene::new();
        let before = scene.node_count();
        let err = scene
            .import_markup(&mut Stub { glyphs: 0 }, "title", "hello")
            .unwrap_err();
        assert!(matches!(err, ScenographError::Pipeline(_)));
        assert_eq!(scene.node_count(), before);
    }
}
