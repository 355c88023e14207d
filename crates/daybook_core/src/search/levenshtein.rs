//! Edit distance between two strings.

/// Minimum number of single-character insertions, deletions and
/// substitutions turning `a` into `b`.
///
/// Works on `char`s, so multi-byte letters count as one edit.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // rows follow `b`, columns follow `a`
    let mut matrix = vec![vec![0usize; a.len() + 1]; b.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=b.len() {
        for j in 1..=a.len() {
            let substitution = usize::from(a[j - 1] != b[i - 1]);
            matrix[i][j] = (matrix[i - 1][j - 1] + substitution)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j] + 1);
        }
    }

    matrix[b.len()][a.len()]
}

#[cfg(test)]
mod tests {
    use super::distance;

    #[test]
    fn identical_strings_have_zero_distance() {
        for value in ["", "a", "fahrrad", "großartig"] {
            assert_eq!(distance(value, value), 0);
        }
    }

    #[test]
    fn empty_side_costs_the_other_length() {
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("abcd", ""), 4);
        assert_eq!(distance("", "größe"), 5);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [("kitten", "sitting"), ("fahrd", "fahrrad"), ("flaw", "lawn")];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn known_distances() {
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("fahrd", "fahrrad"), 2);
        assert_eq!(distance("flaw", "lawn"), 2);
    }
}
