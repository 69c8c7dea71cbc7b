use std::cmp::Ordering;

use crate::things::VisSprite;

/// Nearest first, and the taller of two equally near sprites first
#[inline]
fn compare(a: &VisSprite, b: &VisSprite) -> Ordering {
    a.depth.cmp(&b.depth).then_with(|| b.gzt.cmp(&a.gzt))
}

/// R_SortVisSprites. Fills `order` with indexes in to `sprites`. Drawing
/// walks it from the end so far sprites are painted first.
pub fn sort_vissprites(sprites: &[VisSprite], order: &mut Vec<usize>) {
    order.clear();
    order.extend(0..sprites.len());
    order.sort_by(|a, b| compare(&sprites[*a], &sprites[*b]));
}

#[cfg(test)]
mod tests {
    use super::sort_vissprites;
    use crate::things::VisSprite;
    use math::FixedPoint;

    fn vis(depth: i32, gzt: i32) -> VisSprite {
        VisSprite {
            depth: FixedPoint::from(depth),
            gzt: FixedPoint::from(gzt),
            ..VisSprite::default()
        }
    }

    #[test]
    fn depth_then_top() {
        let sprites = [vis(5, 10), vis(3, 20), vis(8, 5), vis(3, 30)];
        let mut order = Vec::new();
        sort_vissprites(&sprites, &mut order);
        assert_eq!(order, vec![3, 1, 0, 2]);

        let drawn: Vec<(i32, i32)> = order
            .iter()
            .rev()
            .map(|i| (sprites[*i].depth.to_int(), sprites[*i].gzt.to_int()))
            .collect();
        // back to front
        assert_eq!(drawn, vec![(8, 5), (5, 10), (3, 20), (3, 30)]);
    }

    #[test]
    fn reuses_order_buffer() {
        let mut order = vec![9, 9, 9, 9, 9];
        sort_vissprites(&[vis(1, 1)], &mut order);
        assert_eq!(order, vec![0]);
        sort_vissprites(&[], &mut order);
        assert!(order.is_empty());
    }
}
