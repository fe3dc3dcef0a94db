// ============================================
// src/random.rs
// 乱数ソースの抽象化 (テストでは決まった列を流し込む)
// ============================================

use rand::Rng;
use rand::rngs::ThreadRng;

/// 出題・選択肢生成で使う乱数ソース
pub trait RandomSource {
    /// `0..upper` の一様乱数を返す (`upper` は 1 以上)
    fn below(&mut self, upper: usize) -> usize;
}

/// `rand` の Rng をそのまま乱数ソースとして使うラッパー
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        Self(rand::rng())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn below(&mut self, upper: usize) -> usize {
        self.0.random_range(0..upper)
    }
}

/// 重複なしで `count` 個を取り出す (部分 Fisher-Yates)
///
/// 呼び出し側で `count <= items.len()` を保証すること。
pub fn choose<T: Clone, R: RandomSource + ?Sized>(
    items: &[T],
    count: usize,
    rng: &mut R,
) -> Vec<T> {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    let count = count.min(indices.len());
    for i in 0..count {
        let j = i + rng.below(indices.len() - i);
        indices.swap(i, j);
    }
    indices[..count].iter().map(|&i| items[i].clone()).collect()
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::testing::Scripted;
    use super::*;

    #[test]
    fn choose_returns_distinct_members() {
        let items: Vec<u32> = (0..20).collect();
        let mut rng = RngSource(StdRng::seed_from_u64(7));
        for count in 0..=items.len() {
            let picked = choose(&items, count, &mut rng);
            assert_eq!(picked.len(), count);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), count);
            assert!(picked.iter().all(|p| items.contains(p)));
        }
    }

    #[test]
    fn choose_follows_the_scripted_sequence() {
        // i=0: 0 + 2 -> "c", i=1: 1 + 0 -> swap済みの位置1 = "b"
        let items = ["a", "b", "c", "d"];
        let picked = choose(&items, 2, &mut Scripted::new([2, 0]));
        assert_eq!(picked, vec!["c", "b"]);
    }

    #[test]
    fn choose_caps_count_at_len() {
        let items = [1, 2, 3];
        let picked = choose(&items, 10, &mut Scripted::default());
        assert_eq!(picked.len(), 3);
    }
}
