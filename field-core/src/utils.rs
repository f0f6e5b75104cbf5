pub fn div_up(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}

/// Smallest power of two >= `n`; `0` maps to `1`.
pub fn next_power_of_2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Consecutive groups of `n` items. A trailing partial group is dropped.
pub fn group_by_n<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    if n == 0 {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(items.len() / n);
    let mut current = Vec::with_capacity(n);

    for item in items {
        current.push(item);

        if current.len() == n {
            result.push(std::mem::replace(&mut current, Vec::with_capacity(n)));
        }
    }

    return result;
}

pub fn range(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// Every index tuple of a `dims`-shaped grid, in row-major order.
pub fn ndrange(dims: &[usize]) -> Vec<Vec<usize>> {
    let Some((&first, rest)) = dims.split_first() else {
        return vec![Vec::new()];
    };

    let inner = ndrange(rest);
    let mut result = Vec::with_capacity(first * inner.len());

    for i in 0..first {
        for tail in &inner {
            let mut index = Vec::with_capacity(dims.len());

            index.push(i);
            index.extend_from_slice(tail);
            result.push(index);
        }
    }

    return result;
}
