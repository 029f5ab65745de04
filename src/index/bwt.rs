/// 根据后缀数组构建 BWT：bwt[i] 为后缀 sa[i] 之前的字符，
/// 哨兵所在后缀（sa[i] == 0）取文本最后一个字符。
pub fn build_bwt(text: &[u8], sa: &[u32]) -> Vec<u8> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    sa.iter()
        .map(|&p| {
            let i = p as usize;
            if i == 0 { text[n - 1] } else { text[i - 1] }
        })
        .collect()
}

/// 构建反向文本：去掉末尾哨兵后整体反转，再把哨兵接回末尾，
/// 保证反向索引沿用"哨兵最小且唯一"的约定。
pub fn build_reversed_text(text: &[u8]) -> Vec<u8> {
    let Some((&sentinel, body)) = text.split_last() else {
        return Vec::new();
    };
    let mut reversed: Vec<u8> = body.iter().rev().copied().collect();
    reversed.push(sentinel);
    reversed
}
