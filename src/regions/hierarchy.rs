//! Region forest stored as an arena with index links.
//!
//! Regions are kept in border-discovery order of the tracer: the raster
//! position (row-major) of the pixel where each border was first met. That
//! order is the scan order of every selector built on top of the hierarchy.
//!
//! The outermost rows and columns of the mask are cleared before tracing, so
//! a component touching the image edge still gets an outer border (one pixel
//! inside the frame) and its holes keep a parent.

use crate::geometry::{min_area_rect_i32, AxisRect, RotatedRect};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use serde::{Deserialize, Serialize};

/// Which side of a foreground component a border runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderKind {
    Outer,
    Hole,
}

/// Which borders are retained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Retrieval {
    /// Every border with full nesting.
    Tree,
    /// Only outer borders of top-level components, no nesting.
    External,
}

/// One traced border plus its enclosing rectangles and tree links.
#[derive(Clone, Debug)]
pub struct Region {
    pub points: Vec<[i32; 2]>,
    pub rect: RotatedRect,
    pub bounds: AxisRect,
    pub kind: BorderKind,
    pub parent: Option<usize>,
    pub first_child: Option<usize>,
    pub next_sibling: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct RegionHierarchy {
    regions: Vec<Region>,
}

impl RegionHierarchy {
    pub fn from_mask(mask: &GrayImage, retrieval: Retrieval) -> Self {
        if mask.width() == 0 || mask.height() == 0 {
            return Self::default();
        }
        Self::from_contours(find_contours::<i32>(&with_cleared_frame(mask)), retrieval)
    }

    pub fn from_contours(contours: Vec<Contour<i32>>, retrieval: Retrieval) -> Self {
        let mut regions: Vec<Region> = contours
            .into_iter()
            .filter(|c| match retrieval {
                Retrieval::Tree => true,
                Retrieval::External => c.parent.is_none() && c.border_type == BorderType::Outer,
            })
            .map(|c| {
                let points: Vec<[i32; 2]> = c.points.iter().map(|p| [p.x, p.y]).collect();
                Region {
                    rect: min_area_rect_i32(&points),
                    bounds: AxisRect::from_points(&points),
                    kind: match c.border_type {
                        BorderType::Outer => BorderKind::Outer,
                        BorderType::Hole => BorderKind::Hole,
                    },
                    parent: match retrieval {
                        Retrieval::Tree => c.parent,
                        Retrieval::External => None,
                    },
                    first_child: None,
                    next_sibling: None,
                    points,
                }
            })
            .collect();

        let mut last_child: Vec<Option<usize>> = vec![None; regions.len()];
        for idx in 0..regions.len() {
            let Some(parent) = regions[idx].parent else {
                continue;
            };
            match last_child[parent] {
                None => regions[parent].first_child = Some(idx),
                Some(prev) => regions[prev].next_sibling = Some(idx),
            }
            last_child[parent] = Some(idx);
        }

        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Region> {
        self.regions.get(idx)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Regions with their index, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Region)> {
        self.regions.iter().enumerate()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter()
            .filter(|(_, r)| r.parent.is_none())
            .map(|(idx, _)| idx)
    }

    /// Direct children of `idx` in discovery order.
    pub fn children(&self, idx: usize) -> Children<'_> {
        Children {
            hierarchy: self,
            next: self.get(idx).and_then(|r| r.first_child),
        }
    }
}

/// Copy of `mask` with its one-pixel frame set to background.
fn with_cleared_frame(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut out = mask.clone();
    for x in 0..w {
        out.put_pixel(x, 0, Luma([0]));
        out.put_pixel(x, h - 1, Luma([0]));
    }
    for y in 0..h {
        out.put_pixel(0, y, Luma([0]));
        out.put_pixel(w - 1, y, Luma([0]));
    }
    out
}

pub struct Children<'a> {
    hierarchy: &'a RegionHierarchy,
    next: Option<usize>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (usize, &'a Region);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let region = self.hierarchy.get(idx)?;
        self.next = region.next_sibling;
        Some((idx, region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White square with two black holes on a black canvas.
    fn two_hole_mask() -> GrayImage {
        let mut mask = GrayImage::new(40, 30);
        for y in 5..25 {
            for x in 5..35 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        for y in 10..20 {
            for x in 10..15 {
                mask.put_pixel(x, y, Luma([0]));
            }
            for x in 25..30 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        mask
    }

    #[test]
    fn tree_links_children_in_discovery_order() {
        let hierarchy = RegionHierarchy::from_mask(&two_hole_mask(), Retrieval::Tree);
        assert_eq!(hierarchy.len(), 3);
        let roots: Vec<usize> = hierarchy.roots().collect();
        assert_eq!(roots, vec![0]);
        let outer = hierarchy.get(0).unwrap();
        assert_eq!(outer.kind, BorderKind::Outer);
        assert_eq!(outer.bounds, AxisRect::new(5, 5, 30, 20));

        let children: Vec<(usize, &Region)> = hierarchy.children(0).collect();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|(_, r)| r.kind == BorderKind::Hole));
        assert!(children[0].1.bounds.x < children[1].1.bounds.x);
        assert!(children.iter().all(|(_, r)| r.parent == Some(0)));
    }

    #[test]
    fn external_retrieval_drops_nesting() {
        let hierarchy = RegionHierarchy::from_mask(&two_hole_mask(), Retrieval::External);
        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy.children(0).count(), 0);
    }

    #[test]
    fn frame_touching_component_keeps_outer_border() {
        let mut mask = GrayImage::from_pixel(30, 20, Luma([255]));
        for y in 5..15 {
            for x in 10..18 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        let hierarchy = RegionHierarchy::from_mask(&mask, Retrieval::Tree);
        assert_eq!(hierarchy.len(), 2);
        let outer = hierarchy.get(0).unwrap();
        assert_eq!(outer.kind, BorderKind::Outer);
        assert_eq!(outer.parent, None);
        assert_eq!(outer.bounds, AxisRect::new(1, 1, 28, 18));

        let children: Vec<(usize, &Region)> = hierarchy.children(0).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].1.kind, BorderKind::Hole);
        assert_eq!(children[0].1.parent, Some(0));
    }

    #[test]
    fn full_frame_foreground_is_one_region() {
        let mask = GrayImage::from_pixel(12, 8, Luma([255]));
        let hierarchy = RegionHierarchy::from_mask(&mask, Retrieval::Tree);
        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy.get(0).unwrap().bounds, AxisRect::new(1, 1, 10, 6));
        let external = RegionHierarchy::from_mask(&mask, Retrieval::External);
        assert_eq!(external.len(), 1);
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let hierarchy = RegionHierarchy::from_mask(&GrayImage::new(16, 16), Retrieval::Tree);
        assert!(hierarchy.is_empty());
        assert_eq!(hierarchy.roots().count(), 0);
    }
}
