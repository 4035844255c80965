//! Pre-built cgroup hierarchies for testing.

use super::filesystem::MockFs;

const GIB: i64 = 1 << 30;

impl MockFs {
    /// Mount point used by the pre-built hierarchies.
    pub const CGROUP_ROOT: &'static str = "/sys/fs/cgroup";

    /// Root of the contrived protection overage hierarchy.
    pub const OVERAGE_ROOT: &'static str = "/sys/fs/cgroup/protection_overage.fakeroot";

    /// A small systemd-style hierarchy.
    ///
    /// ```text
    /// /sys/fs/cgroup
    /// ├── system.slice            8G used, low 2G
    /// │   ├── service1.service  1.5G used, low 1G
    /// │   ├── service2.service    1G used
    /// │   ├── service3.service    1G used
    /// │   ├── service4.service    1G used
    /// │   └── slice1.slice        1G used
    /// │       └── job.service   512M used
    /// └── workload.slice          4G used
    ///     └── service1.service    2G used
    /// ```
    pub fn system_hierarchy() -> Self {
        let mut fs = Self::new();
        let root = std::path::Path::new(Self::CGROUP_ROOT);

        fs.add_file(root.join("cgroup.controllers"), "cpu io memory pids\n");

        let system = root.join("system.slice");
        fs.add_cgroup(&system, 8 * GIB, 2 * GIB);
        fs.add_file(system.join("memory.min"), "0\n");
        fs.add_file(
            system.join("memory.pressure"),
            "some avg10=1.50 avg60=0.75 avg300=0.20 total=123456\n\
             full avg10=0.50 avg60=0.25 avg300=0.05 total=65432\n",
        );

        fs.add_cgroup(system.join("service1.service"), 3 * GIB / 2, GIB);
        fs.add_file(system.join("service1.service/memory.min"), "0\n");
        for name in ["service2.service", "service3.service", "service4.service"] {
            fs.add_cgroup(system.join(name), GIB, 0);
        }
        fs.add_cgroup(system.join("slice1.slice"), GIB, 0);
        fs.add_cgroup(system.join("slice1.slice/job.service"), GIB / 2, 0);

        let workload = root.join("workload.slice");
        fs.add_cgroup(&workload, 4 * GIB, 0);
        fs.add_cgroup(workload.join("service1.service"), 2 * GIB, 0);

        fs
    }

    /// Two independent subtrees with different protection budgets.
    ///
    /// ```text
    /// protection_overage.fakeroot
    /// ├── A      4G used, low 2G
    /// │   ├── A1    2G used, low 1G
    /// │   └── A2  512M used, low 768M
    /// └── B      6G used, low 3G
    ///     ├── B1    3G used, low 1G
    ///     └── B2  2.5G used, low 2G
    /// ```
    pub fn protection_overage_hierarchy() -> Self {
        let mut fs = Self::new();
        let root = std::path::Path::new(Self::OVERAGE_ROOT);

        fs.add_cgroup(root.join("A"), 4 * GIB, 2 * GIB);
        fs.add_cgroup(root.join("A/A1"), 2 * GIB, GIB);
        fs.add_cgroup(root.join("A/A2"), GIB / 2, 3 * GIB / 4);

        fs.add_cgroup(root.join("B"), 6 * GIB, 3 * GIB);
        fs.add_cgroup(root.join("B/B1"), 3 * GIB, GIB);
        fs.add_cgroup(root.join("B/B2"), 5 * GIB / 2, 2 * GIB);

        fs
    }
}
