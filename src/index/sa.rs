/// 构建后缀数组（倍增法，每轮用两次计数排序代替比较排序，O(n log n)）。
/// 输入为原始字节文本，蛋白质索引中以 `$` 结尾、`/` 分隔各条序列；
/// 算法本身不依赖哨兵，允许任意字节（包括重复的分隔符）。
pub fn build_sa(text: &[u8]) -> Vec<u32> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }

    let all: Vec<usize> = (0..n).collect();
    let mut rank: Vec<usize> = text.iter().map(|&b| b as usize).collect();
    let mut next_rank = vec![0usize; n];
    let mut by_second = vec![0usize; n];
    let mut sa = vec![0usize; n];
    // 字节文本的初始秩在 [0, 256) 内
    let mut classes = 256usize;
    let mut k = 1usize;

    loop {
        // 第二关键字：后缀 i+k 的秩 + 1，越界记为 0（短后缀更小）
        let second = |i: usize| if i + k < n { rank[i + k] + 1 } else { 0 };

        counting_sort(&all, &mut by_second, classes + 1, second);
        counting_sort(&by_second, &mut sa, classes, |i| rank[i]);

        next_rank[sa[0]] = 0;
        for t in 1..n {
            let (a, b) = (sa[t - 1], sa[t]);
            let differs = rank[a] != rank[b] || second(a) != second(b);
            next_rank[b] = next_rank[a] + usize::from(differs);
        }
        std::mem::swap(&mut rank, &mut next_rank);

        classes = rank[sa[n - 1]] + 1;
        if classes == n || k >= n {
            break;
        }
        k <<= 1;
    }

    sa.into_iter().map(|x| x as u32).collect()
}

/// 按 key 对 items 做稳定计数排序，结果写入 out。key 取值须小于 buckets。
fn counting_sort(items: &[usize], out: &mut [usize], buckets: usize, key: impl Fn(usize) -> usize) {
    let mut start = vec![0usize; buckets + 1];
    for &i in items {
        start[key(i) + 1] += 1;
    }
    for b in 1..=buckets {
        start[b] += start[b - 1];
    }
    for &i in items {
        let slot = &mut start[key(i)];
        out[*slot] = i;
        *slot += 1;
    }
}
